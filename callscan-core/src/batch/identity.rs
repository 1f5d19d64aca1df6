//! Agent/phone identity from recording file names.
//!
//! Call recordings arrive named `<agent>_<phone>.<ext>`, e.g.
//! `JohnSmith_555-0199.mp3`. The agent half is expanded from camel case,
//! the phone half keeps digits only of its separators.

/// Parsed recording identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallIdentity {
    pub agent_name: String,
    pub phone_number: String,
}

/// Split a file stem into agent and phone at the first underscore.
///
/// Stems without an underscore map entirely to the agent name with an empty
/// phone number.
pub fn parse_identity(stem: &str) -> CallIdentity {
    let (agent_raw, phone_raw) = match stem.split_once('_') {
        Some((agent, phone)) => (agent, phone),
        None => (stem, ""),
    };
    CallIdentity {
        agent_name: space_camel_case(agent_raw),
        phone_number: phone_raw.chars().filter(|c| *c != '-' && *c != '.').collect(),
    }
}

/// Insert spaces before interior capitals: `JohnSmith` → `John Smith`.
///
/// Names that already contain a space are left untouched.
fn space_camel_case(name: &str) -> String {
    if name.contains(' ') {
        return name.to_owned();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
