// Log output through tracing-subscriber. In the browser each formatted line
// goes to console.log; natively it goes to stderr and RUST_LOG wins over the
// configured level.

use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io;

    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = console)]
        fn log(s: &str);
    }

    /// Buffers one event and hands it to `console.log` when dropped.
    #[derive(Default)]
    pub struct ConsoleWriter {
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.buf);
            let line = line.trim_end();
            if !line.is_empty() {
                log(line);
            }
        }
    }
}

fn parse_filter(filter: &str) -> Result<EnvFilter, EngineError> {
    EnvFilter::try_new(filter)
        .map_err(|e| EngineError::InvalidConfig(format!("log level '{filter}': {e}")))
}

/// Install the global subscriber. Returns false if one was already installed.
pub fn init(filter: &str) -> Result<bool, EngineError> {
    let filter = parse_filter(filter)?;

    #[cfg(target_arch = "wasm32")]
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(console::ConsoleWriter::default)
        .with_ansi(false)
        .without_time()
        .try_init();

    #[cfg(not(target_arch = "wasm32"))]
    let result = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or(filter))
        .with_writer(std::io::stderr)
        .try_init();

    Ok(result.is_ok())
}
