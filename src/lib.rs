//! Backend de convoyage de vehículos
//!
//! Este crate contiene el núcleo del sistema de reservas y operaciones de
//! convoyage: máquina de estados de misiones, cálculo de distancia/precio,
//! asignación de chóferes y notificaciones.

pub mod config;
pub mod state;
pub mod database;
pub mod services;
pub mod utils;
pub mod models;
pub mod middleware;
pub mod controllers;
pub mod repositories;
pub mod routes;
pub mod dto;
