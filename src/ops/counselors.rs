use std::sync::Arc;

use tracing::info;

use super::{EXIT_API_ERROR, EXIT_CONFIG_MISSING, EXIT_INVALID_ARGS, ExitError, print_state};
use crate::{
    api::{ApiError, HttpApi},
    config::{Config, DataArgs, IdArgs, UpdateArgs},
    domain::{DomainError, parse_record_data, validate_record_id},
    store::CounselorStore,
};

fn counselor_store(config: &Config) -> Result<CounselorStore, ExitError> {
    let api_config = config.counselor_api().ok_or_else(|| {
        ExitError::new(
            EXIT_CONFIG_MISSING,
            "config_missing: set --api-url or COUNSELING_API_URL",
        )
    })?;
    let api = HttpApi::new(api_config)
        .map_err(|e| ExitError::new(EXIT_INVALID_ARGS, format!("invalid_args: {e:#}")))?;
    Ok(CounselorStore::new(Arc::new(api)))
}

fn invalid(err: DomainError) -> ExitError {
    ExitError::new(EXIT_INVALID_ARGS, format!("{}: {err}", err.code()))
}

/// Prints the state either way; a rejected operation also fails the command.
fn finish<T>(store: &CounselorStore, result: Result<T, ApiError>) -> Result<(), ExitError> {
    print_state(&store.state())?;
    result
        .map(|_| ())
        .map_err(|e| ExitError::new(EXIT_API_ERROR, format!("api_error: {e}")))
}

pub async fn cmd_counselors_list(config: &Config) -> Result<(), ExitError> {
    let store = counselor_store(config)?;
    let result = store.fetch_all().await;
    if let Ok(items) = &result {
        info!(count = items.len(), "fetched counselors");
    }
    finish(&store, result)
}

pub async fn cmd_counselors_get(config: &Config, args: IdArgs) -> Result<(), ExitError> {
    let id = validate_record_id(&args.id).map_err(invalid)?;
    let store = counselor_store(config)?;
    let result = store.fetch_by_id(id).await;
    finish(&store, result)
}

pub async fn cmd_counselors_create(config: &Config, args: DataArgs) -> Result<(), ExitError> {
    let data = parse_record_data(&args.data).map_err(invalid)?;
    let store = counselor_store(config)?;
    let result = store.create(data).await;
    if let Ok(created) = &result {
        info!(id = created.id().unwrap_or("-"), "created counselor");
    }
    finish(&store, result)
}

pub async fn cmd_counselors_update(config: &Config, args: UpdateArgs) -> Result<(), ExitError> {
    let id = validate_record_id(&args.id).map_err(invalid)?;
    let data = parse_record_data(&args.data).map_err(invalid)?;
    let store = counselor_store(config)?;
    // Prime the collection so the in-place replacement has something to hit.
    if let Err(err) = store.fetch_all().await {
        return finish(&store, Err::<(), _>(err));
    }
    let result = store.update(id, data).await;
    finish(&store, result)
}

pub async fn cmd_counselors_delete(config: &Config, args: IdArgs) -> Result<(), ExitError> {
    let id = validate_record_id(&args.id).map_err(invalid)?;
    let store = counselor_store(config)?;
    if let Err(err) = store.fetch_all().await {
        return finish(&store, Err::<(), _>(err));
    }
    let result = store.delete(id).await;
    if let Ok(id) = &result {
        info!(%id, "deleted counselor");
    }
    finish(&store, result)
}
