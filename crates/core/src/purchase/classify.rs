//! Classification of failed purchase transactions.
//!
//! Sui reports a Move abort in the effects status as the debug rendering of
//! the execution error, for example:
//!
//! ```text
//! MoveAbort(MoveLocation { module: ModuleId { address: 00..02,
//!   name: Identifier("dynamic_field") }, function: 11, instruction: 0,
//!   function_name: Some("remove_child_object") }, 1) in command 1
//! ```
//!
//! `dynamic_field::remove_child_object` aborting with code 1 inside a kiosk
//! purchase means the listed item was taken out of the kiosk by a competing
//! buyer before ours executed. Every matching rule for that signature lives
//! in this file; revisit it whenever the node's error encoding changes.

use serde_json::Value;

pub const ALREADY_SOLD_MODULE: &str = "dynamic_field";
pub const ALREADY_SOLD_FUNCTION: &str = "remove_child_object";
/// `EFieldDoesNotExist` in `sui::dynamic_field`.
pub const ALREADY_SOLD_CODE: u64 = 1;

/// Location and code of a Move abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAbort {
    pub module: String,
    pub function: Option<String>,
    pub code: u64,
}

impl MoveAbort {
    /// Parse the abort out of an effects error string. Accepts the debug
    /// rendering and a JSON object with `module`/`function`/`code` (or
    /// `abort_code`) keys. Returns `None` for anything else.
    pub fn parse(error: &str) -> Option<Self> {
        Self::parse_debug(error).or_else(|| Self::parse_json(error))
    }

    fn parse_debug(error: &str) -> Option<Self> {
        let body = &error[error.find("MoveAbort(")? + "MoveAbort(".len()..];

        let module = quoted_after(body, "name: Identifier(\"")?;
        let function = quoted_after(body, "function_name: Some(\"");

        // The code follows the location struct: `... }, <code>)`.
        let location_end = body.rfind("}, ")?;
        let tail = &body[location_end + "}, ".len()..];
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        let code = digits.parse().ok()?;

        Some(Self {
            module: module.to_string(),
            function: function.map(str::to_string),
            code,
        })
    }

    fn parse_json(error: &str) -> Option<Self> {
        let start = error.find('{')?;
        let value: Value = serde_json::from_str(&error[start..]).ok()?;
        let abort = value.get("MoveAbort").unwrap_or(&value);

        let module = abort.get("module")?.as_str()?;
        let function = abort.get("function").and_then(Value::as_str);
        let code = abort
            .get("code")
            .or_else(|| abort.get("abort_code"))
            .and_then(|code| match code {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })?;

        // Modules may come fully qualified (`0x2::dynamic_field`).
        let module = module.rsplit("::").next().unwrap_or(module);

        Some(Self {
            module: module.to_string(),
            function: function.map(str::to_string),
            code,
        })
    }

    pub fn is_already_sold(&self) -> bool {
        self.module == ALREADY_SOLD_MODULE
            && self.function.as_deref() == Some(ALREADY_SOLD_FUNCTION)
            && self.code == ALREADY_SOLD_CODE
    }
}

fn quoted_after<'a>(haystack: &'a str, marker: &str) -> Option<&'a str> {
    let start = haystack.find(marker)? + marker.len();
    let len = haystack[start..].find('"')?;
    Some(&haystack[start..start + len])
}

/// What went wrong with a submitted purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionErrorKind {
    /// Lost the race for the listing to another buyer.
    AlreadySold,
    /// Anything else, with the node's message unchanged.
    Other(String),
}

/// Classify an effects failure string.
pub fn classify_transaction_error(error: &str) -> TransactionErrorKind {
    let already_sold = match MoveAbort::parse(error) {
        Some(abort) => abort.is_already_sold(),
        // Unparseable: fall back to matching the raw text.
        None => {
            error.contains("MoveAbort")
                && error.contains(ALREADY_SOLD_MODULE)
                && error.contains(ALREADY_SOLD_FUNCTION)
                && error.trim_end().contains(&format!(", {})", ALREADY_SOLD_CODE))
        }
    };

    if already_sold {
        TransactionErrorKind::AlreadySold
    } else {
        TransactionErrorKind::Other(error.to_string())
    }
}
