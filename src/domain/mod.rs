// Domain layer: form and mail models plus the ports the handler talks through.

pub mod model;
pub mod ports;
