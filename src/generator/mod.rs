//! Crawler-facing files written next to the public assets.

pub mod robots;
pub mod sitemap;

pub use robots::build_robots;
pub use sitemap::build_sitemap;
