mod environment_tests;
