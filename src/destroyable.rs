// implemented by anything holding an Rc back to itself through a channel subscription;
// the cycle has to be broken by hand before the value can be dropped
pub trait Destroyable {
    fn destroy(&mut self);
}
