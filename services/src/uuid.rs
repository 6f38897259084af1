use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
///
/// The same input always yields the same UUID, so records keyed by it are
/// overwritten on re-ingestion instead of duplicated.
pub fn stable_uuid(id: &str) -> Uuid {
    stable_uuid_bytes(id.as_bytes())
}

/// [`stable_uuid`] over raw bytes, for ids that need not be valid UTF-8.
pub fn stable_uuid_bytes(id: &[u8]) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id)
}
