use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub spreadsheet: PathBuf,
    pub sheet_name: String,
    pub session_hours: i64,
    pub registration: RegistrationMode,
    pub seed_users: bool,
    pub secure_cookies: bool,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("CHRONO_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CHRONO_HOST: {e}"))?;

        let port: u16 = env_or("CHRONO_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid CHRONO_PORT: {e}"))?;

        let data_dir = PathBuf::from(env_or("CHRONO_DATA_DIR", "data"));

        let spreadsheet = std::env::var("CHRONO_SPREADSHEET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("Example of Critical Minerals in Africa.xlsx"));

        let sheet_name = env_or("CHRONO_SHEET_NAME", "Provide a list of all critical ");

        let session_hours: i64 = env_or("CHRONO_SESSION_HOURS", "2")
            .parse()
            .map_err(|e| format!("Invalid CHRONO_SESSION_HOURS: {e}"))?;
        if session_hours <= 0 {
            return Err("CHRONO_SESSION_HOURS must be positive".to_string());
        }

        let registration = match env_or("CHRONO_REGISTRATION", "open").as_str() {
            "open" => RegistrationMode::Open,
            "closed" => RegistrationMode::Closed,
            other => {
                return Err(format!(
                    "Invalid CHRONO_REGISTRATION: expected 'open' or 'closed', got '{other}'"
                ));
            }
        };

        let seed_users = env_bool("CHRONO_SEED_USERS", true)?;
        let secure_cookies = env_bool("CHRONO_SECURE_COOKIES", false)?;
        let log_level = env_or("CHRONO_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            data_dir,
            spreadsheet,
            sheet_name,
            session_hours,
            registration,
            seed_users,
            secure_cookies,
            log_level,
        })
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn minerals_file(&self) -> PathBuf {
        self.data_dir.join("minerals.json")
    }

    pub fn deposits_file(&self) -> PathBuf {
        self.data_dir.join("deposits.json")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> Result<bool, String> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(format!("Invalid {key}: expected a boolean, got '{other}'")),
        },
    }
}
