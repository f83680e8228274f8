mod csrf;
mod helpers;
mod pages;
mod session;
