use std::future::Future;

use crate::prompt::Message;
use crate::ReaderError;

/// The text-generation service: role-tagged messages in, reply text out.
///
/// Calls are awaited one at a time; implementations need not be `Sync`.
/// Failures are reported as [`ReaderError::Generation`] and are never
/// retried by callers in this crate.
pub trait Generator {
    fn generate(&self, messages: &[Message]) -> impl Future<Output = Result<String, ReaderError>>;
}

impl<G: Generator> Generator for &G {
    fn generate(&self, messages: &[Message]) -> impl Future<Output = Result<String, ReaderError>> {
        (**self).generate(messages)
    }
}
