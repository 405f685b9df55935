//! Names for the per-request failure state machine described in spec.md
//! §4.6. The pipeline's actual control flow is axum's short-circuit
//! response mechanism; this enum exists so tests and logs can refer to a
//! terminal outcome by name.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Accepted,
    RateChecked,
    AuthDecided,
    Forwarding,
    Responded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Ok,
    Rejected429,
    Rejected401,
    Rejected404,
    Rejected413,
    Rejected502,
    Rejected500,
}

impl Terminal {
    pub fn status_code(self) -> u16 {
        match self {
            Terminal::Ok => 200,
            Terminal::Rejected429 => 429,
            Terminal::Rejected401 => 401,
            Terminal::Rejected404 => 404,
            Terminal::Rejected413 => 413,
            Terminal::Rejected502 => 502,
            Terminal::Rejected500 => 500,
        }
    }
}
