use rat_dom::{el, Attr, Child, DomEvent, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Primary,
    Secondary,
    Danger,
    Success,
}

impl Variant {
    fn class(self) -> &'static str {
        match self {
            Variant::Primary => "btn-primary bg-blue-600 text-white",
            Variant::Secondary => "btn-secondary bg-gray-200 text-gray-900",
            Variant::Danger => "btn-danger bg-red-600 text-white",
            Variant::Success => "btn-success bg-green-600 text-white",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Size {
    Sm,
    #[default]
    Md,
    Lg,
}

impl Size {
    fn class(self) -> &'static str {
        match self {
            Size::Sm => "px-3 py-1.5 text-sm",
            Size::Md => "px-4 py-2 text-base",
            Size::Lg => "px-6 py-3 text-lg",
        }
    }
}

/// A styled `<button type="button">`.
///
/// # Example
/// ```ignore
/// let open = Button::new("Learn more")
///     .variant(Variant::Secondary)
///     .on_click(|_| Ok(()))
///     .build();
/// ```
pub struct Button {
    variant: Variant,
    size: Size,
    disabled: bool,
    attrs: Vec<Attr>,
    children: Vec<Child>,
}

impl Button {
    pub fn new(label: impl Into<Child>) -> Self {
        Self {
            variant: Variant::default(),
            size: Size::default(),
            disabled: false,
            attrs: Vec::new(),
            children: vec![label.into()],
        }
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DomEvent) -> rat_dom::Result<()> + Send + Sync + 'static,
    {
        self.attrs.push(Attr::on("click", handler));
        self
    }

    /// Any other attribute, applied after the defaults.
    pub fn attr(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn build(self) -> Node {
        let class = format!(
            "{} {} font-semibold rounded-lg disabled:opacity-50",
            self.variant.class(),
            self.size.class()
        );
        let mut attrs = vec![
            Attr::attr("type", "button"),
            Attr::class(class),
            Attr::flag("disabled", self.disabled),
        ];
        attrs.extend(self.attrs);
        el("button", attrs, self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_dom::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_variant_and_size_classes() {
        let button = Button::new("Delete").variant(Variant::Danger).size(Size::Sm).build();
        assert_eq!(button.tag().as_deref(), Some("button"));
        assert_eq!(button.attribute("type").as_deref(), Some("button"));
        assert!(button.has_class("btn-danger"));
        assert!(button.has_class("text-sm"));
        assert!(!button.has_attribute("disabled"));
        assert_eq!(button.text_content(), "Delete");
    }

    #[test]
    fn test_click_and_extra_attributes() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        let button = Button::new("Save")
            .disabled(true)
            .attr(Attr::attr("title", "save it"))
            .on_click(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();
        assert!(button.has_attribute("disabled"));
        assert_eq!(button.attribute("title").as_deref(), Some("save it"));

        let document = Document::new();
        document.root().append_child(button.clone());
        document.dispatch(DomEvent::new("click", button)).unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }
}
