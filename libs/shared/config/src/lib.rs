// [libs/shared/config/src/lib.rs]
//! Configuracion tipada del daemon. La carga real desde archivos/CLI queda
//! fuera de alcance; esta crate solo ofrece `Config::default()` y un
//! `Config::from_env()` best-effort que lee variables `SPALLOC_*`, cayendo
//! a los valores por defecto del documento de diseno cuando faltan o no
//! parsean.

use std::env;
use std::time::Duration;
use tracing::warn;

/// Parametros de todas las tareas periodicas y limites operativos descritos
/// en la tabla de interfaces externas del daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Periodo del tick del Allocator.
    pub allocator_period: Duration,
    /// Periodo del temporizador del PowerController (ademas del despertar
    /// guiado por eventos tras cada pasada del Allocator).
    pub power_controller_period: Duration,
    /// Periodo del ExpirySweep de keepalive.
    pub keepalive_expiry_period: Duration,
    /// Edad tras `death_timestamp` antes de tombstoning.
    pub historical_grace_period: Duration,
    /// Periodo entre corridas de Tombstone.
    pub historical_period: Duration,
    /// Cuota por defecto (board-seconds) para grupos sin fila propia.
    pub quota_default: i64,
    /// Plazo por llamada al driver BMP.
    pub bmp_deadline: Duration,
    /// Duracion minima apagada antes de permitir un nuevo encendido.
    pub bmp_min_off: Duration,
    /// Duracion minima encendida antes de permitir un nuevo apagado.
    pub bmp_min_on: Duration,
    /// Ventana de reintento de `Busy` en el Store.
    pub store_busy_timeout: Duration,
    /// Periodo de consolidacion de cuotas.
    pub quota_consolidation_period: Duration,
    /// Bandera global de pausa del Scheduler.
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allocator_period: Duration::from_secs(5),
            power_controller_period: Duration::from_secs(1),
            keepalive_expiry_period: Duration::from_secs(30),
            historical_grace_period: Duration::from_secs(24 * 3600),
            historical_period: Duration::from_secs(3600),
            quota_default: 0,
            bmp_deadline: Duration::from_secs(10),
            bmp_min_off: Duration::from_secs(5),
            bmp_min_on: Duration::from_secs(5),
            store_busy_timeout: Duration::from_secs(1),
            quota_consolidation_period: Duration::from_secs(5 * 60),
            paused: false,
        }
    }
}

impl Config {
    /// Lee variables `SPALLOC_*`, usando `.env` si esta presente (via
    /// `dotenvy`), y cayendo al valor por defecto para cualquier variable
    /// ausente o que no parsee. Nunca falla: un valor malformado solo se
    /// registra con `tracing::warn!` y se ignora.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            allocator_period: seconds_env("SPALLOC_ALLOCATOR_PERIOD_SECS", defaults.allocator_period),
            power_controller_period: seconds_env("SPALLOC_POWER_CONTROLLER_PERIOD_SECS", defaults.power_controller_period),
            keepalive_expiry_period: seconds_env("SPALLOC_KEEPALIVE_EXPIRY_PERIOD_SECS", defaults.keepalive_expiry_period),
            historical_grace_period: seconds_env("SPALLOC_HISTORICAL_GRACE_PERIOD_SECS", defaults.historical_grace_period),
            historical_period: seconds_env("SPALLOC_HISTORICAL_PERIOD_SECS", defaults.historical_period),
            quota_default: int_env("SPALLOC_QUOTA_DEFAULT", defaults.quota_default),
            bmp_deadline: seconds_env("SPALLOC_BMP_DEADLINE_SECS", defaults.bmp_deadline),
            bmp_min_off: seconds_env("SPALLOC_BMP_MIN_OFF_SECS", defaults.bmp_min_off),
            bmp_min_on: seconds_env("SPALLOC_BMP_MIN_ON_SECS", defaults.bmp_min_on),
            store_busy_timeout: seconds_env("SPALLOC_STORE_BUSY_TIMEOUT_SECS", defaults.store_busy_timeout),
            quota_consolidation_period: seconds_env("SPALLOC_QUOTA_CONSOLIDATION_PERIOD_SECS", defaults.quota_consolidation_period),
            paused: bool_env("SPALLOC_PAUSED", defaults.paused),
        }
    }
}

fn seconds_env(key: &str, fallback: Duration) -> Duration {
    match env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(key, raw, "could not parse as seconds, using default");
                fallback
            }
        },
        Err(_) => fallback,
    }
}

fn int_env(key: &str, fallback: i64) -> i64 {
    match env::var(key) {
        Ok(raw) => raw.parse::<i64>().unwrap_or_else(|_| {
            warn!(key, raw, "could not parse as integer, using default");
            fallback
        }),
        Err(_) => fallback,
    }
}

fn bool_env(key: &str, fallback: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => {
                warn!(key, raw, "could not parse as boolean, using default");
                fallback
            }
        },
        Err(_) => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_periods() {
        let config = Config::default();
        assert_eq!(config.allocator_period, Duration::from_secs(5));
        assert_eq!(config.keepalive_expiry_period, Duration::from_secs(30));
        assert!(!config.paused);
    }

    #[test]
    fn seconds_env_falls_back_on_garbage() {
        let fallback = Duration::from_secs(42);
        assert_eq!(seconds_env("SPALLOC_CONFIG_TEST_DOES_NOT_EXIST", fallback), fallback);
    }

    #[test]
    fn bool_env_accepts_common_spellings() {
        std::env::set_var("SPALLOC_CONFIG_TEST_BOOL", "yes");
        assert!(bool_env("SPALLOC_CONFIG_TEST_BOOL", false));
        std::env::remove_var("SPALLOC_CONFIG_TEST_BOOL");
    }
}
