//! Page collaborator contract for the `navigate_to_section` capability.

/// Space reserved for the fixed site header when scrolling to a section.
pub const DEFAULT_HEADER_OFFSET: u32 = 80;

/// A request to move the page viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub top: u32,
    pub smooth: bool,
}

/// The page that hosts the chat widget.
pub trait PageSurface {
    /// Absolute top position of the element with this id, if there is one.
    fn locate(&self, section_id: &str) -> Option<u32>;

    fn scroll_to(&mut self, request: ScrollRequest);

    fn header_offset(&self) -> u32 {
        DEFAULT_HEADER_OFFSET
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Scrolled(String),
    NotFound(String),
}

impl NavigationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, NavigationOutcome::Scrolled(_))
    }

    /// Result string reported back to the model.
    pub fn result_message(&self) -> String {
        match self {
            NavigationOutcome::Scrolled(id) => format!("scrolled to {}", id),
            NavigationOutcome::NotFound(id) => format!("{} not found", id),
        }
    }
}

/// Smoothly scroll the page so the section sits just below the header.
pub fn navigate_to_section<P: PageSurface + ?Sized>(page: &mut P, section_id: &str) -> NavigationOutcome {
    match page.locate(section_id) {
        Some(top) => {
            let request = ScrollRequest {
                top: top.saturating_sub(page.header_offset()),
                smooth: true,
            };
            page.scroll_to(request);
            NavigationOutcome::Scrolled(section_id.to_string())
        }
        None => NavigationOutcome::NotFound(section_id.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// In-memory page that records every scroll request.
    #[derive(Default)]
    pub struct RecordingPage {
        pub sections: HashMap<String, u32>,
        pub scrolls: Vec<ScrollRequest>,
    }

    impl RecordingPage {
        pub fn with_section(mut self, id: &str, top: u32) -> Self {
            self.sections.insert(id.to_string(), top);
            self
        }
    }

    impl PageSurface for RecordingPage {
        fn locate(&self, section_id: &str) -> Option<u32> {
            self.sections.get(section_id).copied()
        }

        fn scroll_to(&mut self, request: ScrollRequest) {
            self.scrolls.push(request);
        }
    }
}
