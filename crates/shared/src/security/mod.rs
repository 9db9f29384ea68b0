pub mod bearer_auth_middleware;
