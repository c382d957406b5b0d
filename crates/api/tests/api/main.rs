mod availability_test;
mod booking_test;
mod middleware_test;
mod test_utils;
