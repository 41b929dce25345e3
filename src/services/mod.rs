pub mod circuit;
pub mod credentials;
pub mod inflight;
pub mod poller;
pub mod resolver;
pub mod trigger;

#[cfg(test)]
pub(crate) mod testing;
