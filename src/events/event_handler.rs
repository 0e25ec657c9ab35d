/// Implemented by consumers that react to a stream of engine events,
/// such as the console renderer.
pub trait EventHandler<T> {
    fn handle_event(&mut self, event: &T);
}
