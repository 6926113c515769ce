pub mod workforce;
