//! neuro-harness library exports for testing

use clap::ValueEnum;

pub mod client;
pub mod core;
pub mod tui;

#[cfg(test)]
pub mod test_support;

/// Which demo page to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PageKind {
    /// Chat room with the set_name bootstrap.
    #[default]
    Chat,
    /// Chat room plus custom action registration.
    Playground,
    /// Generic API tester.
    Tester,
}

impl PageKind {
    pub fn title(&self) -> &'static str {
        match self {
            PageKind::Chat => "Chat room",
            PageKind::Playground => "Action playground",
            PageKind::Tester => "API tester",
        }
    }

    /// Whether rendered chat rows are forwarded to the client as context.
    pub fn mirrors_chat(&self) -> bool {
        matches!(self, PageKind::Chat | PageKind::Playground)
    }
}
