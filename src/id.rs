use ulid::Ulid;

/// Request ids tag every phase of one dispatched operation.
pub fn new_request_id() -> String {
    Ulid::new().to_string()
}
