/// Signature of a JIT-compiled plot kernel.
///
/// The kernel takes the sample value of `x` and returns the value of the expression.
/// Domain errors are not trapped: the result may be NaN or infinite.
pub type SampleFn = extern "C" fn(f64) -> f64;
