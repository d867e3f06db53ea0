//! Plain-text outline of a slide plan.
//!
//! Each slide becomes a numbered title followed by indented bullets, with
//! slides separated by a blank line.

use crate::pipeline::DeckPlan;

/// Indentation used for bullets and figure lines.
const INDENT: &str = "   ";

/// Formatter for the plain-text deck outline.
#[derive(Debug, Clone)]
pub struct OutlineFormatter {
    show_figures: bool,
    show_qa: bool,
}

impl Default for OutlineFormatter {
    fn default() -> Self {
        Self {
            show_figures: true,
            show_qa: true,
        }
    }
}

impl OutlineFormatter {
    /// Create a formatter that includes figures and Q&A.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include `[figure: <file>]` lines for matched images.
    pub fn with_figures(mut self, show: bool) -> Self {
        self.show_figures = show;
        self
    }

    /// Include the trailing Q&A block.
    pub fn with_qa(mut self, show: bool) -> Self {
        self.show_qa = show;
        self
    }

    /// Format a plan as an outline.
    ///
    /// # Example output
    /// ```text
    /// 1. Introduction
    ///    - Sequence models are slow
    ///
    /// 2. Experimental Results
    ///    - Achieves 85.2% accuracy on ImageNet
    ///    [figure: page6_img1.png]
    /// ```
    pub fn format(&self, plan: &DeckPlan) -> String {
        let mut blocks: Vec<String> = plan
            .slides
            .iter()
            .enumerate()
            .map(|(index, slide)| {
                let mut lines = vec![format!("{}. {}", index + 1, slide.title)];
                lines.extend(slide.bullets.iter().map(|b| format!("{}- {}", INDENT, b)));

                if self.show_figures {
                    if let Some(name) = plan.figure_for(index).and_then(|a| a.path.file_name()) {
                        lines.push(format!("{}[figure: {}]", INDENT, name.to_string_lossy()));
                    }
                }
                lines.join("\n")
            })
            .collect();

        if self.show_qa && !plan.qa_pairs.is_empty() {
            let mut qa = vec!["Q&A".to_string()];
            qa.extend(plan.qa_pairs.iter().map(|pair| pair.to_string()));
            blocks.push(qa.join("\n"));
        }

        blocks.join("\n\n")
    }

    /// Format with a trailing newline, or an empty string for an empty plan.
    pub fn format_with_newline(&self, plan: &DeckPlan) -> String {
        let formatted = self.format(plan);
        if formatted.is_empty() {
            formatted
        } else {
            format!("{}\n", formatted)
        }
    }
}
