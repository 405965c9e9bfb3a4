//! Reusable UI components.
//!
//! SYSTEM CONTEXT
//! ==============
//! `protected_route` is the render-time guard for authenticated pages;
//! `nav_bar` shows the signed-in identity and the logout action.

pub mod nav_bar;
pub mod protected_route;
