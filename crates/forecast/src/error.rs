use finflow_core::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
