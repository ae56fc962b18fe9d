mod run;
mod store;

pub use run::run;
