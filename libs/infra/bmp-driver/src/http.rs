// [libs/infra/bmp-driver/src/http.rs]
//! Implementacion real sobre HTTP: un unico `reqwest::Client` compartido
//! entre todas las direcciones de BMP conocidas, con el plazo aplicado
//! por-llamada via `reqwest::RequestBuilder::timeout`.

use crate::errors::BmpError;
use crate::{BmpDriver, PowerCommand};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{instrument, warn};

#[derive(Serialize)]
struct ApplyPowerPayload {
    board_num: u32,
    power: bool,
    links: LinksPayload,
}

#[derive(Serialize)]
struct LinksPayload {
    n: bool,
    e: bool,
    se: bool,
    s: bool,
    w: bool,
    nw: bool,
}

#[derive(Serialize)]
struct WriteBlacklistPayload<'a> {
    board_num: u32,
    data: &'a [u8],
}

#[derive(Deserialize)]
struct BlacklistEnvelope {
    data: Vec<u8>,
}

#[derive(Deserialize)]
struct SerialEnvelope {
    serial: String,
}

pub struct HttpBmpDriver {
    client: reqwest::Client,
}

impl HttpBmpDriver {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("spalloc-bmp-driver/0.1")
                .build()
                .expect("bmp http client must build with default settings"),
        }
    }

    fn endpoint(address: &str, path: &str) -> String {
        format!("http://{}{}", address.trim_end_matches('/'), path)
    }
}

impl Default for HttpBmpDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BmpDriver for HttpBmpDriver {
    #[instrument(skip(self, command))]
    async fn apply_power(&self, address: &str, command: &PowerCommand, deadline: Duration) -> Result<(), BmpError> {
        let url = Self::endpoint(address, "/power");
        let payload = ApplyPowerPayload {
            board_num: command.board_num,
            power: command.power,
            links: LinksPayload {
                n: command.links.n,
                e: command.links.e,
                se: command.links.se,
                s: command.links.s,
                w: command.links.w,
                nw: command.links.nw,
            },
        };

        let response = self
            .client
            .post(&url)
            .timeout(deadline)
            .json(&payload)
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            warn!(status = %response.status(), "bmp rejected apply_power");
            Err(BmpError::Rejected(format!("HTTP_{}", response.status())))
        }
    }

    #[instrument(skip(self))]
    async fn read_blacklist(&self, address: &str, board_num: u32, deadline: Duration) -> Result<Vec<u8>, BmpError> {
        let url = Self::endpoint(address, &format!("/blacklist/{board_num}"));
        let response = self
            .client
            .get(&url)
            .timeout(deadline)
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        if response.status().is_success() {
            let envelope: BlacklistEnvelope = response.json().await?;
            Ok(envelope.data)
        } else {
            Err(BmpError::Rejected(format!("HTTP_{}", response.status())))
        }
    }

    #[instrument(skip(self, data))]
    async fn write_blacklist(&self, address: &str, board_num: u32, data: &[u8], deadline: Duration) -> Result<(), BmpError> {
        let url = Self::endpoint(address, &format!("/blacklist/{board_num}"));
        let response = self
            .client
            .put(&url)
            .timeout(deadline)
            .json(&WriteBlacklistPayload { board_num, data })
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BmpError::Rejected(format!("HTTP_{}", response.status())))
        }
    }

    #[instrument(skip(self))]
    async fn read_serial(&self, address: &str, board_num: u32, deadline: Duration) -> Result<String, BmpError> {
        let url = Self::endpoint(address, &format!("/serial/{board_num}"));
        let response = self
            .client
            .get(&url)
            .timeout(deadline)
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        if response.status().is_success() {
            let envelope: SerialEnvelope = response.json().await?;
            Ok(envelope.serial)
        } else {
            Err(BmpError::Rejected(format!("HTTP_{}", response.status())))
        }
    }
}

impl HttpBmpDriver {
    fn classify_transport_error(error: reqwest::Error) -> BmpError {
        if error.is_timeout() {
            BmpError::Timeout
        } else {
            BmpError::Transport(error)
        }
    }
}
