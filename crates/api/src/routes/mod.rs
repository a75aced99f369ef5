//! 路由控制器

pub mod forecast;
pub mod health;
pub mod page;
