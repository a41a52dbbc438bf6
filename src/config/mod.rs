// 配置模块

mod loader;
mod settings;

pub use loader::*;
pub use settings::DeckSettings;
