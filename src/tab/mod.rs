mod manager;
mod row;

pub use manager::TabManager;
pub use row::TabRow;
