use std::collections::HashMap;

/// The role selected by the SSH user name at authentication time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Writer,
    Reader,
    Register,
}

impl Role {
    /// Map an SSH user name to a role. Only `w`, `r`, `x` are recognized.
    pub fn from_user(user: &str) -> Option<Role> {
        match user {
            "w" => Some(Role::Writer),
            "r" => Some(Role::Reader),
            "x" => Some(Role::Register),
            _ => None,
        }
    }

    pub fn can_write(self) -> bool {
        matches!(self, Role::Writer)
    }
}

/// Phase of the per-channel request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    Open,
    EnvAccumulating,
    Executing,
}

/**
    Per-channel state: accumulated environment and which phase of the
    `env*` → `exec` → close state machine the channel is in. Owned
    exclusively by the task servicing that channel; never shared.
*/
pub struct ChannelState {
    pub phase: ChannelPhase,
    pub env: HashMap<String, String>,
}

impl ChannelState {
    pub fn new() -> Self {
        Self {
            phase: ChannelPhase::Open,
            env: HashMap::new(),
        }
    }

    /// Record one `env` name/value pair; later values override earlier ones.
    pub fn set_env(&mut self, name: String, value: String) {
        if self.phase == ChannelPhase::Open {
            self.phase = ChannelPhase::EnvAccumulating;
        }
        self.env.insert(name, value);
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}
