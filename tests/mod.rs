mod google_calendar_mock;

// This file organizes the integration tests into a cohesive test suite.
// Each module tests a specific aspect of the application:
// - smoke_tests: Basic functionality tests to ensure nothing is broken
// - pipeline_scenarios: End-to-end extraction with the offline heuristics
// - understanding_mock: Stubbed language understanding services
// - google_calendar_mock: Mocking the calendar to test event creation
