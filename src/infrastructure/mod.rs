pub mod chrome_page;
pub mod driver;
pub mod js_executor;

pub use chrome_page::ChromePage;
pub use driver::{ElementHandle, Matcher, PageDriver};
pub use js_executor::JsExecutor;
