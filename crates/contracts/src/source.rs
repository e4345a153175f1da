//! CsiSource trait - radio driver abstraction
//!
//! Decouples the feature pipeline from where CSI frames come from
//! (driver callback, diagnostic-log replay, synthetic generator).

use std::sync::Arc;

use crate::CsiFrame;

/// CSI frame callback type
///
/// Invoked on the source's producer context once per received frame.
/// The callback must run to completion quickly; a slow callback drops
/// frames upstream.
pub type CsiFrameCallback = Arc<dyn Fn(&CsiFrame) + Send + Sync>;

/// CSI data source trait
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn CsiSource> = get_source();
/// source.listen(Arc::new(move |frame| {
///     pipeline.lock().on_packet(frame.view());
/// }));
/// // ...
/// source.stop();
/// ```
pub trait CsiSource: Send + Sync {
    /// Source name for logging
    fn source_name(&self) -> &str;

    /// Register the frame callback and start delivering.
    ///
    /// Repeated calls while already listening are ignored.
    fn listen(&self, callback: CsiFrameCallback);

    /// Stop delivering frames
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
