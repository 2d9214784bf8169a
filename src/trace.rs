//! Logging shims over the `log` facade.
//!
//! With the `log` feature disabled the arguments are still type-checked but
//! nothing is emitted and no code is generated.

macro_rules! cbor_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        {
            ::log::debug!($($arg)*);
        }
        #[cfg(not(feature = "log"))]
        {
            if false {
                let _ = ::core::format_args!($($arg)*);
            }
        }
    }};
}

macro_rules! cbor_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        {
            ::log::trace!($($arg)*);
        }
        #[cfg(not(feature = "log"))]
        {
            if false {
                let _ = ::core::format_args!($($arg)*);
            }
        }
    }};
}
