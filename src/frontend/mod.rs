pub mod impl_gui;
pub mod impl_web;
pub mod interface;
pub mod render;
