/// Notified after every committed graph mutation with the ids it touched
/// (entity and relationship ids, including merged-away ids).
pub trait IGraphObserver: Send + Sync {
    fn on_mutation(&self, affected_ids: &[String]);
}
