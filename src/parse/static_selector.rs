use std::{ops::Deref, sync::OnceLock};

use scraper::Selector;

/// CSS selector compiled on first use. Declare with [`static_selector!`].
#[derive(Debug)]
pub struct StaticSelector {
    css: &'static str,
    compiled: OnceLock<Selector>,
}

impl StaticSelector {
    pub const fn new(css: &'static str) -> Self {
        Self {
            css,
            compiled: OnceLock::new(),
        }
    }
}

impl Deref for StaticSelector {
    type Target = Selector;

    fn deref(&self) -> &Selector {
        self.compiled.get_or_init(|| {
            Selector::parse(self.css)
                .unwrap_or_else(|e| panic!("static selector `{}` is invalid: {e:?}", self.css))
        })
    }
}

#[macro_export]
macro_rules! static_selector {
    ($name: ident <- $css: literal) => {
        static $name: $crate::parse::static_selector::StaticSelector =
            $crate::parse::static_selector::StaticSelector::new($css);
    };
}
