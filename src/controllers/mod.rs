//! Controllers del sistema
//!
//! Orquestan las operaciones de la API por recurso, entre las rutas y los
//! servicios de dominio.

pub mod mission_controller;
pub mod notification_controller;
