// Application layer: panel de administración y salida de terminal

pub mod admin;
pub mod vestuario;

pub use admin::{AdminConsole, AdminDashboard};
