// handlers/protected - endpoints behind the bearer token guard
//
// Every route here is mounted under `jwt_auth_middleware`, so handlers can
// rely on an `AuthUser` extension being present.

pub mod deliveries;
pub mod patients;
