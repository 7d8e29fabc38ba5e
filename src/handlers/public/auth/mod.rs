// handlers/public/auth - token acquisition, no authentication required

pub mod login; // POST /login - authenticate the admin and get a JWT

pub use login::login;
