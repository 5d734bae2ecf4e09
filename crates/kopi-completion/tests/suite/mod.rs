mod engine;
mod fallback;
mod ordering;
mod session;
mod support;
