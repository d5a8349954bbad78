pub mod announcements;
pub mod blob;
pub mod defaults;
pub mod kpis;
pub mod merge;
pub mod theme;
pub mod visibility;
pub mod widgets;
