/// Every authenticated RPC returns its value alongside the server's
/// in-band `invalid` signal. `invalid = true` means the server has
/// rejected the node identity used for the call: a distinguished signal,
/// not a [`submerge_base::Error`]; see SPEC_FULL.md §4.2.
#[derive(Clone, Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub invalid: bool,
}

impl<T> Outcome<T> {
    pub fn new(value: T, invalid: bool) -> Self {
        Outcome { value, invalid }
    }
}

#[derive(Clone, Debug)]
pub struct PublishOutcome {
    pub message: Option<String>,
    pub error_code: Option<i32>,
    pub invalid: bool,
}
