//! Resolve the name of the function that called into the logger.

/// Substituted when no caller can be resolved.
pub(crate) const UNKNOWN_FUNC_NAME: &str = "UnknownFuncName";

/// How many frames to inspect before giving up.
pub(crate) const MAX_CALLER_DEPTH: usize = 32;

/// Symbol prefixes of the logger's own frames, from the stack walk up to the
/// public `DayLog` entry points. Both the legacy (`daylog::DayLog::info`) and
/// the v0 (`<daylog::DayLog>::info`) demangled forms are covered.
const LOGGER_PREFIXES: &[&str] = &[
    concat!(env!("CARGO_CRATE_NAME"), "::caller::resolve"),
    concat!(env!("CARGO_CRATE_NAME"), "::DayLog::"),
    concat!(env!("CARGO_CRATE_NAME"), "::DayLog>::"),
];

/// Walk the stack and return the innermost path component of the first
/// function past the logger's frames, e.g. `handle_request` for
/// `server::conn::handle_request`.
///
/// Inlined functions are reported as several symbols on one frame,
/// innermost first, so every symbol of a frame is handed to the scan.
pub(crate) fn resolve() -> String {
    let mut scan = CallerScan::default();
    backtrace::trace(|frame| {
        let mut symbols = Vec::new();
        backtrace::resolve_frame(frame, |symbol| {
            if let Some(name) = symbol.name() {
                symbols.push(format!("{name:#}"));
            }
        });
        scan.frame(symbols.as_slice())
    });
    scan.finish()
}

/// Picks the caller out of demangled frame symbols, outermost last.
///
/// Frames of the unwinder come first and are skipped until a logger frame
/// shows up. The first symbol after that which is not the logger's is the
/// caller. Only [`MAX_CALLER_DEPTH`] frames are looked at.
#[derive(Debug, Default)]
struct CallerScan {
    frames: usize,
    in_logger: bool,
    caller: Option<String>,
}

impl CallerScan {
    /// Feed the symbols of the next frame. Returns whether the walk should
    /// go on.
    fn frame<S: AsRef<str>>(&mut self, symbols: &[S]) -> bool {
        if self.caller.is_some() || self.frames >= MAX_CALLER_DEPTH {
            return false;
        }
        self.frames += 1;
        for name in symbols.iter().map(AsRef::as_ref) {
            if is_logger_frame(name) {
                self.in_logger = true;
            } else if self.in_logger {
                self.caller = short_name(name);
                if self.caller.is_some() {
                    break;
                }
            }
        }
        self.caller.is_none() && self.frames < MAX_CALLER_DEPTH
    }

    fn finish(self) -> String {
        self.caller.unwrap_or_else(|| UNKNOWN_FUNC_NAME.to_owned())
    }
}

fn is_logger_frame(symbol: &str) -> bool {
    let symbol = symbol.trim_start_matches('<');
    LOGGER_PREFIXES.iter().any(|prefix| symbol.starts_with(prefix))
}

/// Reduce a demangled symbol to its last meaningful path component.
fn short_name(symbol: &str) -> Option<String> {
    strip_generic_args(symbol)
        .rsplit("::")
        .find(|part| !part.is_empty() && !part.starts_with("{{") && !is_hash(part))
        .map(|part| part.trim_end_matches('>').to_owned())
}

/// Drop `::<..>` argument lists, e.g. `app::run::<Vec<u8>>` to `app::run`.
fn strip_generic_args(symbol: &str) -> String {
    let mut stripped = String::with_capacity(symbol.len());
    let mut depth = 0usize;
    let mut rest = symbol;
    while let Some(c) = rest.chars().next() {
        if depth == 0 && rest.starts_with("::<") {
            depth = 1;
            rest = &rest[3..];
            continue;
        }
        match (depth, c) {
            (0, _) => stripped.push(c),
            (_, '<') => depth += 1,
            (_, '>') => depth -= 1,
            _ => {}
        }
        rest = &rest[c.len_utf8()..];
    }
    stripped
}

/// Legacy mangling leaves a `h0123456789abcdef` disambiguator at the end.
fn is_hash(part: &str) -> bool {
    part.len() == 17 && part.starts_with('h') && part[1..].bytes().all(|b| b.is_ascii_hexdigit())
}
