use std::path::Path;

use tracing::warn;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::Result;
use crate::trampoline::c_text;
use crate::widget::Widget;

/// A CSS style provider. Not a widget: releasing it drops a reference instead of destroying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProvider {
    handle: Widget,
}

impl StyleProvider {
    pub fn new(context: &Context) -> Result<Self> {
        let raw = context.toolkit().css_provider_new();
        Ok(Self {
            handle: Widget::adopt(context, ResourceKind::StyleProvider, raw)?,
        })
    }

    /// Returns `false` and logs the parser message when the stylesheet is rejected.
    pub fn load_from_data(&self, css: &str) -> bool {
        let Ok(css) = c_text(css, "stylesheet") else {
            warn!("stylesheet contains an interior NUL byte");
            return false;
        };
        let Ok(raw) = self.handle.raw() else {
            return false;
        };
        match self.handle.context().toolkit().css_provider_load_from_data(raw, &css) {
            Ok(()) => true,
            Err(message) => {
                warn!(%message, "failed to load stylesheet");
                false
            }
        }
    }

    pub fn load_from_path(&self, path: &Path) -> bool {
        let Some(text) = path.to_str() else {
            warn!(path = %path.display(), "stylesheet path is not valid UTF-8");
            return false;
        };
        let Ok(native_path) = c_text(text, "stylesheet path") else {
            return false;
        };
        let Ok(raw) = self.handle.raw() else {
            return false;
        };
        match self
            .handle
            .context()
            .toolkit()
            .css_provider_load_from_path(raw, &native_path)
        {
            Ok(()) => true,
            Err(message) => {
                warn!(path = %path.display(), %message, "failed to load stylesheet");
                false
            }
        }
    }

    /// Styles `widget` alone.
    pub fn apply_to(&self, widget: &Widget, priority: u32) -> Result<()> {
        let provider = self.handle.raw()?;
        let target = widget.raw()?;
        self.handle
            .context()
            .toolkit()
            .style_add_provider(target, provider, priority);
        Ok(())
    }

    /// Styles every widget on the screen `widget` is shown on.
    pub fn apply_to_screen(&self, widget: &Widget, priority: u32) -> Result<()> {
        let provider = self.handle.raw()?;
        let target = widget.raw()?;
        self.handle
            .context()
            .toolkit()
            .style_add_provider_for_screen(target, provider, priority);
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_live()
    }

    /// Drops the provider's reference. Repeated calls do nothing.
    pub fn release(&self) {
        self.handle.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::rc::Rc;

    use gtkbind_sys::constants::GTK_STYLE_PROVIDER_PRIORITY_APPLICATION;

    use super::*;
    use crate::toolkit::{HeadlessToolkit, NativeCall};
    use crate::widgets::Window;

    #[test]
    fn malformed_css_is_reported_as_false() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let provider = StyleProvider::new(&context).expect("provider");
        assert!(provider.load_from_data("button { padding: 4px; }"));
        assert!(!provider.load_from_data("button { padding: 4px;"));
    }

    #[test]
    fn loads_from_a_file() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let provider = StyleProvider::new(&context).expect("provider");
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "label {{ color: #333; }}").expect("write css");
        assert!(provider.load_from_path(file.path()));
        assert!(!provider.load_from_path(Path::new("/nonexistent/gtkbind/theme.css")));
    }

    #[test]
    fn release_unrefs_instead_of_destroying() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let window = Window::new(&context, "w", 10, 10).expect("window");
        let provider = StyleProvider::new(&context).expect("provider");
        provider
            .apply_to_screen(&window, GTK_STYLE_PROVIDER_PRIORITY_APPLICATION)
            .expect("apply");
        let raw = toolkit.created("css-provider")[0];
        provider.release();
        provider.release();
        let calls = toolkit.calls();
        assert!(calls.contains(&NativeCall::Unref(raw)));
        assert!(!calls.contains(&NativeCall::Destroy(raw)));
        assert!(!provider.is_live());
    }
}
