use crate::error::{AcademyResult, BadEnvVarSnafu, ParseBoolSnafu};
use dotenvy::var;
use snafu::ResultExt;
use std::{env::VarError, sync::Arc};

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    server_ip: Arc<str>,
    seed_sample_data: bool,
}

impl RuntimeConfiguration {
    pub fn new() -> AcademyResult<Self> {
        let seed_sample_data = get_env_var_or("ACADEMY_SEED_SAMPLE_DATA", "true")?
            .trim()
            .parse()
            .context(ParseBoolSnafu {
                name: "ACADEMY_SEED_SAMPLE_DATA",
            })?;

        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            server_ip: get_env_var_or("ACADEMY_SERVER_IP", "127.0.0.1:8080")?.into(),
            seed_sample_data,
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub const fn seed_sample_data(&self) -> bool {
        self.seed_sample_data
    }
}

#[derive(Debug)]
pub struct DbConfig {
    url: String,
}

impl DbConfig {
    pub fn new() -> AcademyResult<Self> {
        Ok(Self {
            url: get_env_var_or("ACADEMY_DATABASE_URL", "sqlite://academy.db")?,
        })
    }

    pub fn get_db_url(&self) -> &str {
        &self.url
    }
}

fn get_env_var_or(name: &'static str, default: &str) -> AcademyResult<String> {
    match var(name) {
        Ok(value) => Ok(value),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(default.to_string()),
        Err(source) => Err(source).context(BadEnvVarSnafu { name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_vars_fall_back_to_defaults() {
        let value = get_env_var_or("ACADEMY_TEST_SURELY_UNSET_VARIABLE", "fallback")
            .expect("default should be used");
        assert_eq!(value, "fallback");
    }
}
