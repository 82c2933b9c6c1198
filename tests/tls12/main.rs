mod common;
mod ecdhe;
mod edge;
mod handshake;
mod ordering;
