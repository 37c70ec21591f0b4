//! Concrete catalog sites

pub mod my_abandonware;
