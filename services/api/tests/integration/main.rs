mod auth_test;
mod helpers;
mod issue_test;
mod router_test;
mod statistics_test;
mod user_test;
