use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::{EXIT_API_ERROR, EXIT_CONFIG_MISSING, EXIT_INVALID_ARGS, ExitError, print_state};
use crate::{
    api::{ErrorPayload, FilePart, HttpApi, NotePayload, RequestConfig},
    config::{Config, NoteCreateArgs},
    store::SessionNoteStore,
};

fn note_store(config: &Config) -> Result<SessionNoteStore, ExitError> {
    let api_config = config.notes_api().ok_or_else(|| {
        ExitError::new(
            EXIT_CONFIG_MISSING,
            "config_missing: set --notes-api-url, --api-url or COUNSELING_API_URL",
        )
    })?;
    let api = HttpApi::new(api_config)
        .map_err(|e| ExitError::new(EXIT_INVALID_ARGS, format!("invalid_args: {e:#}")))?;
    Ok(SessionNoteStore::new(Arc::new(api)))
}

fn finish<T>(store: &SessionNoteStore, result: Result<T, ErrorPayload>) -> Result<(), ExitError> {
    print_state(&store.state())?;
    result
        .map(|_| ())
        .map_err(|e| ExitError::new(EXIT_API_ERROR, format!("api_error: {e}")))
}

pub async fn cmd_notes_list(config: &Config) -> Result<(), ExitError> {
    let store = note_store(config)?;
    let result = store.fetch_all().await;
    if let Ok(notes) = &result {
        info!(count = notes.len(), "fetched session notes");
    }
    finish(&store, result)
}

pub async fn cmd_notes_create(config: &Config, args: NoteCreateArgs) -> Result<(), ExitError> {
    if !args.files.is_empty() && !args.multipart {
        return Err(ExitError::new(
            EXIT_INVALID_ARGS,
            "invalid_args: --file requires --multipart",
        ));
    }

    let mut payload = NotePayload::new();
    for (key, value) in args.fields {
        payload = payload.field(key, Value::String(value));
    }
    for (field, path) in args.files {
        let part = FilePart::from_path(field, &path)
            .await
            .map_err(|e| ExitError::new(EXIT_INVALID_ARGS, format!("invalid_args: {e:#}")))?;
        payload = payload.file(part);
    }

    let mut request_config = if args.multipart {
        RequestConfig::multipart()
    } else {
        RequestConfig::default()
    };
    for (name, value) in args.headers {
        request_config = request_config.with_header(name, value);
    }

    let store = note_store(config)?;
    let result = store.create(payload, request_config).await;
    if let Ok(note) = &result {
        info!(id = note.id().unwrap_or("-"), "saved session note");
    }
    finish(&store, result)
}
